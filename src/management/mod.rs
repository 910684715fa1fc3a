mod token_store;

pub use token_store::StoreError;
pub use token_store::TOKEN_FILE_NAME;
pub use token_store::TokenStore;
