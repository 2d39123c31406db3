pub mod credentials;

pub use credentials::SessionCredentials;
