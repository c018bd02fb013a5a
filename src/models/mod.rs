pub mod issue;
pub mod request;
pub mod response;
pub mod result;

pub use issue::*;
pub use request::*;
pub use response::*;
pub use result::*;
