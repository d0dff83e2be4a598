fn main() {
    if let Err(e) = hostswitch::cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
