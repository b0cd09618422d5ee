// ABOUTME: Constants for the interpreter: arena/sink capacity, version, REPL banner

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "cellscheme";
pub const WELCOME_SUBTITLE: &str = "a tagged-cell Scheme interpreter with mark-sweep GC";

/// Default arena capacity: 16384 cells gives enough headroom for deep
/// tail-recursive loops without tuning.
pub const DEFAULT_MAX_CELLS: usize = 1 << 14;

/// Size of the sink, the bounded explicit-roots stack that every publicly
/// allocated cell is pushed onto.
pub const DEFAULT_MAX_SINK_SIZE: usize = 1024;

pub const HELP_TEXT: &str = r#"
Enter any expression to evaluate it. Ctrl-D exits the REPL.
"#;
