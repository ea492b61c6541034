pub mod check_auth_doc;
pub mod providers;
pub mod resolve;
pub mod search;
