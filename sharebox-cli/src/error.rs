use sharebox_api::client::error::RequestError;

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub struct Error {
    context: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    pub fn new() -> Error {
        Error {
            context: None,
            src: None,
        }
    }

    pub fn context<C>(mut self, cxt: C) -> Error
    where
        C: Into<String>
    {
        self.context = Some(cxt.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Error
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.context, &self.src) {
            (Some(cxt), Some(src)) => write!(f, "{}: {}", cxt, src),
            (Some(cxt), None) => write!(f, "{}", cxt),
            (None, Some(src)) => write!(f, "{}", src),
            (None, None) => write!(f, "UNKNOWN ERROR"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::new().context(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::new().context(msg)
    }
}

pub trait Context<T, E> {
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BoxDynError>
{
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        match self {
            Ok(v) => Ok(v),
            Err(err) => Err(Error::new()
                .context(cxt)
                .source(err))
        }
    }
}

impl<T> Context<T, ()> for std::option::Option<T> {
    fn context<C>(self, cxt: C) -> std::result::Result<T, Error>
    where
        C: Into<String>
    {
        match self {
            Some(v) => Ok(v),
            None => Err(Error::new().context(cxt))
        }
    }
}

macro_rules! simple_catch {
    ($e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new().source(err)
            }
        }
    };
}

simple_catch!(std::io::Error);
simple_catch!(serde_yaml::Error);
simple_catch!(ActionError);

/// failure of a single user action. every variant is terminal for the
/// action that produced it and leaves the catalog and transfer session in a
/// consistent state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// the service could not be reached or the transfer broke off
    #[error("network error: {0}")]
    Network(String),

    /// the service answered but did not accept the request
    #[error("server rejected the request: {0}")]
    ServerRejected(String),

    /// a local precondition did not hold, nothing was sent
    #[error("{0}")]
    Validation(String),

    /// the same kind of operation is already running
    #[error("{0} is already in progress")]
    Busy(&'static str),
}

impl ActionError {
    pub fn validation<M>(msg: M) -> Self
    where
        M: Into<String>
    {
        ActionError::Validation(msg.into())
    }
}

impl From<RequestError> for ActionError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(api) => ActionError::ServerRejected(api.to_string()),
            RequestError::Reqwest(err) => {
                if err.is_decode() {
                    ActionError::ServerRejected(format!("malformed response: {}", err))
                } else {
                    ActionError::Network(display_chain(&err))
                }
            },
            RequestError::Url(err) => ActionError::Validation(format!("invalid url: {}", err)),
        }
    }
}

/// joins an error with its sources since reqwest keeps the interesting part
/// (connection refused, dns failure) in the source chain
fn display_chain(err: &dyn std::error::Error) -> String {
    let mut rtn = err.to_string();
    let mut next = err.source();

    while let Some(src) = next {
        rtn.push_str(": ");
        rtn.push_str(&src.to_string());

        next = src.source();
    }

    rtn
}
