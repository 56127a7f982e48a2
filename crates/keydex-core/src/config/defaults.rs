//! Default values for keydex configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Keyword Service Defaults
// ============================================================================

/// Default keyword service base URL (Ollama-style generate API).
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434";

/// Default generation model.
pub const DEFAULT_LLM_MODEL: &str = "gemma:2b";

/// Sampling temperature. Kept low so the model extracts rather than paraphrases.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Per-attempt request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Input text is truncated to this many characters before building the prompt.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

/// Total attempts per keyword request (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit in milliseconds. Attempt `n` waits `n * backoff` before retrying.
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;

// ============================================================================
// Indexer Defaults
// ============================================================================

/// Maximum number of file pipelines in flight at once.
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 64;

/// Maximum number of concurrent keyword service requests.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Keyword records are persisted in batches of this size.
pub const DEFAULT_KEYWORD_BATCH_SIZE: usize = 100;

/// Text extraction reads at most this many bytes of a file (1 MiB).
pub const DEFAULT_MAX_EXTRACT_BYTES: u64 = 1024 * 1024;

/// Extensions the plain text extractor accepts (lower-case, no leading dot).
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    // Plain text and documents
    "txt", "md", "markdown", "rst", "csv", "tsv", "log",
    // Config/Data
    "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml",
    // Web
    "html", "htm", "css",
    // Source
    "rs", "go", "py", "js", "ts", "jsx", "tsx", "java", "kt", "c", "h", "cpp", "hpp",
    "cs", "rb", "php", "swift", "sql",
    // Shell
    "sh", "bash", "zsh",
];

/// Hash value recorded when a file's content could not be hashed.
pub const HASH_SENTINEL: &str = "error-hash";

/// Minimum normalized keyword length (inclusive).
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Maximum normalized keyword length (inclusive).
pub const MAX_KEYWORD_CHARS: usize = 49;

// ============================================================================
// Storage Defaults
// ============================================================================

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = ".keydex";

/// Default catalog database file name.
pub const DEFAULT_DATABASE_FILE: &str = "catalog.db";

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level for the CLI.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Prompts
// ============================================================================

/// Instruction template for keyword generation. The file text is appended after it.
pub const DEFAULT_KEYWORD_PROMPT: &str = r#"You are a search optimizer. Given the text content of a file and its metadata (file name, path, size, creation and modification dates), generate only 5-10 short keywords that would help a user find this file.

Return the keywords as a list, one keyword per line, each line starting with "- ". Do not add numbering, explanations, or any other text.

Example output:
- academics
- module1
- sem4
- operating systems

Text:
"#;
