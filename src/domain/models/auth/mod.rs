pub mod access_requirement;
pub mod authenticated_user;

pub use access_requirement::AccessRequirement;
pub use authenticated_user::AuthenticatedUser;
