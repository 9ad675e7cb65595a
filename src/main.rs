use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    time::UNIX_EPOCH,
};

use clap::{Parser, Subcommand};
use objectkit::{
    bootstrap,
    transfer::{LocalFile, MultipartFile, WriterSink},
    ObjectTemplate, Settings, StorageState,
};
use tracing::{error, info, span, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "objectkit",
    version,
    about = "Object storage operations against the default bucket"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    BucketExists { bucket: String },
    BucketCreate { bucket: String },
    BucketDelete { bucket: String },
    BucketList,
    Exists { key: String },
    /// Create a folder marker
    Mkdir { path: String },
    Put {
        file: PathBuf,
        /// Key to store under; defaults to the file name
        #[arg(long)]
        key: Option<String>,
        /// Store under a random name that keeps the file extension
        #[arg(long, conflicts_with = "key")]
        random_name: bool,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Print a GET URL valid for 24 hours
    Preview { key: String },
    Get {
        key: String,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    List,
    Delete { key: String },
    /// Print the unsigned URL of an object
    Url { key: String },
    GenName { filename: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let cli = Cli::parse();

    if let Command::GenName { filename } = &cli.command {
        return print_or_fail(ObjectTemplate::generate_file_name(filename));
    }

    let template = match bootstrap(&cli.settings) {
        Err(err) => {
            error!(error_message=%err, error_group="bootstrap");
            return ExitCode::FAILURE;
        }
        Ok(StorageState::Disabled) => {
            error!(
                error_message = "storage is not configured",
                error_group = "bootstrap",
                missing = ?cli.settings.missing_keys()
            );
            return ExitCode::FAILURE;
        }
        Ok(StorageState::Enabled(template)) => template,
    };

    run(&template, cli.command)
}

fn run(template: &ObjectTemplate, command: Command) -> ExitCode {
    match command {
        Command::BucketExists { bucket } => match template.bucket_exists(&bucket) {
            Err(_) => ExitCode::FAILURE,
            Ok(exists) => {
                println!("{}", exists);
                ExitCode::SUCCESS
            }
        },
        Command::BucketCreate { bucket } => {
            report(template.bucket_create(&bucket), "bucket_create")
        }
        Command::BucketDelete { bucket } => {
            report(template.bucket_delete(&bucket), "bucket_delete")
        }
        Command::BucketList => match template.bucket_list() {
            None => ExitCode::FAILURE,
            Some(buckets) => {
                for b in buckets {
                    let created = b
                        .creation_date
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs().to_string())
                        .unwrap_or_default();
                    println!("{}\t{}", b.name, created);
                }
                ExitCode::SUCCESS
            }
        },
        Command::Exists { key } => {
            println!("{}", template.object_exists(&key));
            ExitCode::SUCCESS
        }
        Command::Mkdir { path } => print_or_fail(template.create_directory(&path)),
        Command::Put {
            file,
            key,
            random_name,
            content_type,
        } => {
            let upload = LocalFile::new(&file).with_content_type(content_type);
            let key = if random_name {
                match ObjectTemplate::generate_file_name(upload.original_filename()) {
                    None => {
                        error!(error_message = "file has no extension", error_group = "put");
                        return ExitCode::FAILURE;
                    }
                    Some(name) => Some(name),
                }
            } else {
                key
            };

            let stored = match key {
                None => template.put_file(&upload),
                Some(key) => match File::open(&file) {
                    Err(err) => {
                        error!(error_message=%err, error_group="open_upload");
                        return ExitCode::FAILURE;
                    }
                    Ok(reader) => template.put_object(reader, &key, upload.content_type()),
                },
            };
            print_or_fail(stored)
        }
        Command::Preview { key } => print_or_fail(template.preview(&key)),
        Command::Get { key, output } => {
            let writer: Box<dyn Write> = match output {
                None => Box::new(io::stdout().lock()),
                Some(path) => match File::create(&path) {
                    Err(err) => {
                        error!(error_message=%err, error_group="create_output");
                        return ExitCode::FAILURE;
                    }
                    Ok(file) => Box::new(BufWriter::new(file)),
                },
            };

            let mut sink = WriterSink::new(writer);
            template.get_object(&key, &mut sink);
            if sink.headers().is_empty() {
                return ExitCode::FAILURE;
            }
            for (name, value) in sink.headers() {
                info!(header = %name, value = %value, "response header");
            }
            ExitCode::SUCCESS
        }
        Command::List => match template.object_list() {
            None => ExitCode::FAILURE,
            Some(items) => {
                for item in items {
                    let kind = if item.is_dir { "dir" } else { "file" };
                    println!("{}\t{}\t{}", kind, item.size, item.key);
                }
                ExitCode::SUCCESS
            }
        },
        Command::Delete { key } => {
            if template.object_delete(&key) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Url { key } => print_or_fail(template.object_url(&key)),
        Command::GenName { filename } => {
            print_or_fail(ObjectTemplate::generate_file_name(&filename))
        }
    }
}

fn report(result: Result<(), objectkit::StorageError>, group: &str) -> ExitCode {
    match result {
        Err(err) => {
            error!(error_message=%err, error_group=group);
            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn print_or_fail(value: Option<String>) -> ExitCode {
    match value {
        None => ExitCode::FAILURE,
        Some(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
    }
}
