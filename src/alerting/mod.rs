pub mod dispatcher;
pub mod signer;
