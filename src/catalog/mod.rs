mod inputs;
mod service;

pub use inputs::{AlbumInput, ArtistInput, SongInput};
pub use service::CatalogService;
