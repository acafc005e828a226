use std::{
    io::{self, BufWriter},
    path::PathBuf,
    str::FromStr,
};

/// Possible choices for output streams used by the emission backends.
/// * "-" and "<out>" are treated as stdout.
/// * "<null>" is treated as a null output stream.
/// * All other strings are treated as file paths.
#[derive(Debug, Clone)]
pub enum OutputFile {
    Null,
    Stdout,
    File {
        path: PathBuf,
        // Has the writer been initialized?
        init: bool,
    },
}

impl OutputFile {
    pub fn file(path: PathBuf) -> Self {
        OutputFile::File { path, init: false }
    }

    pub fn as_path_string(&self) -> String {
        match self {
            OutputFile::Null => "<null>".to_string(),
            OutputFile::Stdout => "<stdout>".to_string(),
            OutputFile::File { path, .. } => {
                path.to_string_lossy().to_string()
            }
        }
    }

    /// Open the underlying stream for writing. The first open of a file
    /// truncates it; later opens append, so one artifact can be streamed
    /// in several passes.
    pub fn get_write(&mut self) -> io::Result<Box<dyn io::Write>> {
        match self {
            OutputFile::Stdout => {
                Ok(Box::new(BufWriter::new(std::io::stdout())))
            }
            OutputFile::File { path, init } => {
                let buf = if *init {
                    BufWriter::new(
                        std::fs::OpenOptions::new().append(true).open(&path)?,
                    )
                } else {
                    *init = true;
                    BufWriter::new(std::fs::File::create(&path)?)
                };
                Ok(Box::new(buf))
            }
            OutputFile::Null => Ok(Box::new(io::sink())),
        }
    }
}

impl FromStr for OutputFile {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "-" | "<out>" => Ok(OutputFile::Stdout),
            "<null>" => Ok(OutputFile::Null),
            _ => Ok(OutputFile::file(PathBuf::from(s))),
        }
    }
}

impl std::fmt::Display for OutputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFile::Stdout => write!(f, "-"),
            OutputFile::Null => write!(f, "<null>"),
            OutputFile::File { path, .. } => {
                write!(f, "{}", path.to_string_lossy())
            }
        }
    }
}
