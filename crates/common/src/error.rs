#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Validation(String),
    NotFound(String),
    Conflict(String),
    Parse(String),
    Io(String),
    Reload(String),
    BadRequest(String),
}

impl Error {
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Parse(m)
            | Self::Io(m)
            | Self::Reload(m)
            | Self::BadRequest(m) => m,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
