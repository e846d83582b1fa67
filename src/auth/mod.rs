pub mod gate;
pub mod password;
pub mod token;

pub use gate::AuthUser;
pub use token::{Claims, TokenService};
