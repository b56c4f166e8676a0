use serde::Serialize;

/// Success envelope: every 2xx body is `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

pub fn ok() -> Data<&'static str> {
    Data::new("ok")
}
