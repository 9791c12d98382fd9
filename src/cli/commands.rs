use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cb",
    about = concat!("corkboard v", env!("CARGO_PKG_VERSION"), " - pin it up, string it together"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new board in the current directory
    Init(InitArgs),
    /// Pin a new item to the board
    Add(AddArgs),
    /// List items, bottom to top
    List(ListArgs),
    /// Show one item and its connections
    Show(IdArg),
    /// Move an item
    Move(MoveArgs),
    /// Resize an item (clamped to the minimum size)
    Resize(ResizeArgs),
    /// Replace an item's content
    Edit(EditArgs),
    /// Remove an item and every connection to it
    Rm(IdArg),
    /// Run a string between two items
    Connect(ConnectArgs),
    /// Remove a connection
    Disconnect(IdArg),
    /// List connections
    Connections,
    /// Show the drawn geometry of a connection
    Line(IdArg),
    /// Search items and connection labels by regex
    Search(SearchArgs),
    /// Validate board integrity
    Check(CheckArgs),
    /// Manage globe markers
    Marker(MarkerCmd),
    /// Compute the arcs drawn on the globe
    Globe(GlobeArgs),
    /// Show the board journal
    Log(LogArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// photo, note, document, wanted, evidence, location or clue
    pub kind: String,
    /// Text on the card; the first line is its title
    pub content: String,
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub x: f64,
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub y: f64,
    /// Width (default: per kind)
    #[arg(long)]
    pub width: Option<f64>,
    /// Height (default: per kind)
    #[arg(long)]
    pub height: Option<f64>,
    /// Image path or URL
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    /// high, medium or low
    #[arg(long)]
    pub importance: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only items of this kind
    #[arg(long)]
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    pub id: String,
    #[arg(allow_negative_numbers = true)]
    pub x: f64,
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

#[derive(Args)]
pub struct ResizeArgs {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: String,
    pub text: String,
}

#[derive(Args)]
pub struct ConnectArgs {
    pub a: String,
    pub b: String,
    /// String color (default from board.toml)
    #[arg(long)]
    pub color: Option<String>,
    /// solid, dashed, dotted or zigzag
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub thickness: Option<f64>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub animated: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for
    pub pattern: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Prune dangling connections and self-loops, grow undersized items
    #[arg(long)]
    pub fix: bool,
}

#[derive(Args)]
pub struct MarkerCmd {
    #[command(subcommand)]
    pub action: MarkerAction,
}

#[derive(Subcommand)]
pub enum MarkerAction {
    /// Add a marker
    Add(MarkerAddArgs),
    /// List markers
    List,
    /// Set the marker arcs fan out from
    Primary(IdArg),
}

#[derive(Args)]
pub struct MarkerAddArgs {
    /// Latitude in degrees, -90..=90
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,
    /// Longitude in degrees, -180..=180
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub size: Option<f64>,
}

#[derive(Args)]
pub struct GlobeArgs {
    /// Marker to fan out from (default: board.toml, then the first marker)
    #[arg(long)]
    pub primary: Option<String>,
    /// Samples per arc (at least 64)
    #[arg(long)]
    pub segments: Option<usize>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: usize,
    /// Only entries of this category (event, write, delete, parser)
    #[arg(long)]
    pub category: Option<String>,
}
