//! Domain services for the signage backend.
//!
//! The group content engine lives here: partitioning images, materializing
//! tiles, distributing and retracting group content, membership and playlist
//! synchronization. Storage and blob storage are reached only through the
//! traits in [`store`] and [`blob`].

pub mod blob;
pub mod distributor;
pub mod group_content;
pub mod image_split;
pub mod membership;
pub mod playlist_sync;
pub mod retractor;
pub mod store;
pub mod tile_materializer;

#[cfg(test)]
pub(crate) mod testing;

pub use blob::{BlobError, BlobStore, StoredBlob};
pub use group_content::{ContentSettings, GroupContentService};
pub use image_split::{partition, tile_rects, PartitionError, Tile, TileRect};
pub use store::{ContentStore, ContentTx};
