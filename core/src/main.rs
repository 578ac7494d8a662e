use std::{env, fs, process};

use log::error;
use pdf_signature_core::{check_pdf_signature, ErrorReport};

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: pdf-sigcheck <file.pdf>");
            process::exit(2);
        }
    };

    let pdf_bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("failed to read {}: {}", path, e);
            process::exit(2);
        }
    };

    let output = match check_pdf_signature(&pdf_bytes) {
        Ok(report) => report.to_json(),
        Err(err) => {
            error!("{}: {}", path, err);
            match ErrorReport::from(&err).to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("failed to render error: {}", e),
            }
            process::exit(1);
        }
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("failed to render report: {}", e);
            process::exit(1);
        }
    }
}
