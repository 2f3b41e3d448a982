fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = masto_cli::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Masto-CLI {}", masto_cli::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Masto-CLI — Read and post to Mastodon from the terminal.\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message\n\nSession commands: home, local, note, notes, toot, cwtoot, fav, boost, exit, quit"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
