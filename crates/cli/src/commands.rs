use std::process::ExitCode;

use catalog_app::admin::{RegistrationError, RegistrationLog};
use catalog_app::books::{self, notice::EMPTY_LISTING, Book, LibraryError, NewBook, Notice};
use catalog_kernel::settings::Settings;

use crate::{AddArgs, BooksCommand, UsersCommand};

pub fn books(command: BooksCommand, settings: &Settings) -> anyhow::Result<ExitCode> {
    let mut library = books::open_library(settings)?;

    let outcome = match command {
        BooksCommand::List { query } => {
            let found = library.search(query.as_deref().unwrap_or_default());
            println!("{}", library.name());
            if found.is_empty() {
                println!("{}", EMPTY_LISTING);
            }
            for book in found {
                println!("{}", summary_line(book));
            }
            return Ok(ExitCode::SUCCESS);
        }
        BooksCommand::Show { isbn } => match library.find_by_isbn(&isbn) {
            Some(book) => {
                print_details(book);
                return Ok(ExitCode::SUCCESS);
            }
            None => Err(LibraryError::NotFound { isbn }),
        },
        BooksCommand::Add(args) => Book::new(new_book(args))
            .and_then(|book| library.add_book(book))
            .map(|outcome| Notice::added(&outcome)),
        BooksCommand::Borrow { isbn } => library
            .borrow_by_isbn(&isbn)
            .map(|book| Notice::borrowed(&book)),
        BooksCommand::Return { isbn } => library
            .return_by_isbn(&isbn)
            .map(|book| Notice::returned(&book)),
        BooksCommand::Delete { isbn } => library
            .delete_by_isbn(&isbn)
            .map(|book| Notice::deleted(&book)),
    };

    match outcome {
        Ok(notice) => {
            println!("{}", notice);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{}", Notice::from(&error));
            if let LibraryError::Storage(cause) = &error {
                eprintln!("{}", cause);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn users(command: UsersCommand, settings: &Settings) -> anyhow::Result<ExitCode> {
    let log = RegistrationLog::new(&settings.admin.registrations_path);

    match command {
        UsersCommand::Register { name, id } => match log.register(&name, &id).await {
            Ok(_) => {
                println!("{}", catalog_app::admin::registrations::REGISTERED_MESSAGE);
                Ok(ExitCode::SUCCESS)
            }
            Err(RegistrationError::Validation(errors)) => {
                for error in errors {
                    eprintln!("{}", error);
                }
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e.into()),
        },
        UsersCommand::List => {
            let registrations = log.list().await?;
            if registrations.is_empty() {
                println!("No users registered yet.");
            }
            for registration in registrations {
                println!("ID: {} - Name: {}", registration.id, registration.name);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn new_book(args: AddArgs) -> NewBook {
    let mut input = NewBook::new(args.title, args.author, args.isbn).quantity(args.quantity);
    input.publication_year = args.year;
    input.genre = args.genre;
    input
}

fn summary_line(book: &Book) -> String {
    format!(
        "{}  {} by {} ({}, {})  available {}/{}",
        book.isbn(),
        book.title(),
        book.author(),
        book.publication_year(),
        book.genre(),
        book.available_copies(),
        book.quantity()
    )
}

fn print_details(book: &Book) {
    println!("{}", book.title());
    println!("Author: {}", book.author());
    println!("ISBN: {}", book.isbn());
    println!("Year: {}", book.publication_year());
    println!("Genre: {}", book.genre());
    println!("Total Quantity: {}", book.quantity());
    println!("Borrowed: {}", book.borrowed_copies());
    println!("Available: {}", book.available_copies());
}
