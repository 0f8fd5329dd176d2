//! Movies domain entities
//!
//! Each entity is a plain serde struct plus its create and update payloads.
//! The [`Entity`](crate::repository::Entity) impl is all the engine needs:
//! which fields are filterable, which foreign keys it holds, and which
//! collections are derived from other entities pointing at it.

mod actor;
mod director;
mod movie;
mod review;

pub use actor::{Actor, ActorCreateInput, ActorUpdateInput};
pub use director::{Director, DirectorCreateInput, DirectorUpdateInput};
pub use movie::{Movie, MovieCreateInput, MovieUpdateInput};
pub use review::{Review, ReviewCreateInput, ReviewUpdateInput};
