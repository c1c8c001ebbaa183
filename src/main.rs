extern crate delivery_zones_lib as lib;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::env;
use std::process;

fn main() {
    env_logger::init();

    let config = lib::Config::new().unwrap_or_else(|e| {
        eprintln!("Cannot load configuration: {}", e);
        process::exit(2);
    });

    let args: Vec<String> = env::args().skip(1).collect();
    let command = lib::Command::parse(&args).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(2);
    });

    match lib::run(&config, command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            let causes: Vec<String> = e.iter_chain().map(|cause| cause.to_string()).collect();
            error!("{}", causes.join(": "));
            match lib::errors::error_kind(&e) {
                Some(kind) => eprintln!("{} ({})", causes.join(": "), kind.code()),
                None => eprintln!("{}", causes.join(": ")),
            }
            process::exit(1);
        }
    }
}
