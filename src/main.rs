use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match cocoprep::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
