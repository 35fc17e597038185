use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = density_cli::command().get_matches();
    density_cli::init_tracing(matches.get_flag("log-json"));

    match density_cli::execute(&matches) {
        Ok(status) => status.exit_code(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
