//! Version information display.

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::scripts;

/// Print version information and the number of embedded scripts.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let builtin = scripts::script_names().len();

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version} ({builtin} built-in scripts)");
        }
        OutputFormat::Json => {
            println!(r#"{{"name":"{name}","version":"{version}","builtin_scripts":{builtin}}}"#);
        }
    }
}
