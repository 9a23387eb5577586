use thiserror::Error;

pub type Result<T> = std::result::Result<T, InjectError>;

#[derive(Error, Debug)]
pub enum InjectError {
    /// Interface not found or unusable.
    #[error("Interface error: {0}")]
    Interface(String),

    /// Raw sockets need root or CAP_NET_RAW.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Socket error: {0}")]
    Socket(String),

    /// A frame write failed.
    #[error("Injection error: {0}")]
    Injection(String),

    /// An information element would not fit its one byte length field.
    #[error("Element {id} too long: {len} bytes (max {max})")]
    ElementTooLong { id: u8, len: usize, max: usize },

    #[error("Unknown modulation '{name}' (available: {available})")]
    UnknownModulation { name: String, available: String },

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Pcap error: {0}")]
    Pcap(#[from] pcap_file::PcapError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<nix::Error> for InjectError {
    fn from(err: nix::Error) -> Self {
        match err {
            nix::Error::EPERM | nix::Error::EACCES => {
                Self::Permission(format!("Operation not permitted: {}", err))
            }
            nix::Error::ENODEV | nix::Error::ENXIO | nix::Error::ENOENT => {
                Self::Interface(format!("Interface not found: {}", err))
            }
            nix::Error::ENETDOWN => Self::Interface(format!("Interface is down: {}", err)),
            _ => Self::Socket(format!("System error: {}", err)),
        }
    }
}
