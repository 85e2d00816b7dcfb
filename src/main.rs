fn main() {
    if let Err(err) = storygraph::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
