mod populations;
mod suggest;

pub use populations::{
    KaraokeUserPopulation, PopulationMember, ScrobbleNeighbourPopulation, StaticPopulation,
    TastePopulation,
};
pub use suggest::{ArtistSuggestion, CollaborativeSuggester, KnownArtist, SuggestionSettings};
