//! `nz-spatial` — link network, spatial indexing, and the receiver grid.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`network`]  | `Network` (sorted links + segment R-tree), `NetworkBuilder` |
//! | [`grid`]     | `ReceiverGrid` — lattice layout, link association, nearest lookup |
//! | [`receiver`] | `Receiver`, `ReceiverState`, `ReceiverBin`, `PresenceRecord` |
//! | [`location`] | `LocationRegistry` — activity location coordinates         |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on the core id types.      |

pub mod error;
pub mod grid;
pub mod location;
pub mod network;
pub mod receiver;


pub use error::{SpatialError, SpatialResult};
pub use grid::ReceiverGrid;
pub use location::LocationRegistry;
pub use network::{Link, LinkProximity, Network, NetworkBuilder};
pub use receiver::{PresenceRecord, Receiver, ReceiverBin, ReceiverState, RelevantLink};
