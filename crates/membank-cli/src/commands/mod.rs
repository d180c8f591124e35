pub mod batch;
pub mod graph;
pub mod maintain;
pub mod memory;
pub mod search;

pub use batch::{BulkDeleteCommand, TagCommand};
pub use graph::{GraphCommand, LinkCommand, MergeCommand, RelatedCommand, UnlinkCommand};
pub use maintain::{PruneCommand, RebuildCommand, StatsCommand};
pub use memory::{AddCommand, DeleteCommand, GetCommand, ListCommand, UpdateCommand};
pub use search::SearchCommand;
