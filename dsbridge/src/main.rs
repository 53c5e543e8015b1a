use clap::Parser;
use codespan_reporting::term::termcolor::NoColor;
use std::io::BufWriter;
use std::path::PathBuf;

use dsbridge::{Driver, Status};

/// Convert a generated model type-map into data-set descriptions
#[derive(Parser)]
#[clap(author, version, about)]
#[clap(after_help = AFTER_HELP)]
struct Cli {
    /// Path to the model map to read
    #[clap(long = "input", short = 'i', name = "MAP_FILE", display_order = 0)]
    input: Option<PathOrStdin>,
    /// Path to write the data-set list to instead of stdout
    #[clap(long = "output", short = 'o', name = "OUT_FILE", display_order = 1)]
    output: Option<PathBuf>,
    /// Emit every known data-set, not just those the operator requires
    #[clap(long = "all", short = 'a')]
    all: bool,
    /// Emit numeric protocol codes instead of base-type names
    #[clap(long = "numeric-types")]
    numeric_types: bool,
    /// Scoped operator name (`pkg::subpkg::operator`) overriding the
    /// document's `root` option
    #[clap(name = "OPERATOR")]
    operator: Option<String>,
}

const AFTER_HELP: &str = "\
Examples:

  $ dsbridge -i mapping.xml -o data-sets.xml
  $ generator | dsbridge Telemetry::Root > data-sets.xml
  $ dsbridge -a -i mapping.xml
";

#[derive(Clone, Debug)]
enum PathOrStdin {
    StdIn,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdin, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdin::StdIn),
            _ => Ok(PathOrStdin::Path(PathBuf::from(src))),
        }
    }
}

fn unwrap_or_exit<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| std::process::exit(Status::Error.exit_code()))
}

fn load_file_or_exit(driver: &mut Driver, file: PathOrStdin) -> dsbridge::source::FileId {
    unwrap_or_exit(match file {
        PathOrStdin::StdIn => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStdin::Path(path) => driver.load_source_path(&path),
    })
}

const MAX_PRETTY_WIDTH: usize = 80;

fn get_pretty_width() -> usize {
    let term_width = termsize::get().map_or(usize::MAX, |size| usize::from(size.cols));
    std::cmp::min(term_width, MAX_PRETTY_WIDTH)
}

fn main() -> ! {
    let cli = Cli::parse();

    let mut driver = Driver::new();
    driver.set_include_all(cli.all);
    driver.set_numeric_type_ids(cli.numeric_types);
    driver.set_emit_width(get_pretty_width());

    if let Some(path) = &cli.output {
        match std::fs::File::create(path) {
            Ok(file) => driver.set_emit_writer(NoColor::new(BufWriter::new(file))),
            Err(error) => {
                eprintln!("error: couldn't open `{}` for writing: {error}", path.display());
                std::process::exit(Status::Error.exit_code());
            }
        }
    }

    let file_id = load_file_or_exit(&mut driver, cli.input.unwrap_or(PathOrStdin::StdIn));
    let status = driver.translate_and_emit(file_id, cli.operator.as_deref());

    std::process::exit(status.exit_code());
}
