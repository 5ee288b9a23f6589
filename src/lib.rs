//! Facade over [`squareblob_client`] for the demo programs in `demos/`.

pub use squareblob_client::*;
