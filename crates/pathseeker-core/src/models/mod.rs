//! Data models for PathSeeker API resources.
//!
//! - `CurrentUser`, `UserUpdate`, `Registration`: account data
//! - `Profile`, `EditableProfile`: profile details (bio, education, work
//!   experience, skills, interests)

pub mod profile;
pub mod user;

pub use profile::{Education, EditableProfile, NewProfile, Profile, ProfileUpdate, WorkExperience};
pub use user::{CurrentUser, NewUser, Registration, RegistrationError, UserRole, UserUpdate};
