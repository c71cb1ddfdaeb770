use std::process;

fn main() {
    if let Err(e) = hexaloy::cli::main() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
