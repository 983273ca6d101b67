//! Argument parsing
//!
//! Each command also names the route it runs at, which the navigator starts
//! from.

use std::convert::Infallible;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use common::Secret;
use marketplace::{Id, Role, SearchFilters};

/// `campus-stay` command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "campus-stay",
    about = "Browse, book and review student accommodation",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        email: String,
        #[arg(value_parser = secret)]
        password: Secret<String>,
    },
    /// Create an account and sign in to it.
    Signup {
        name: String,
        email: String,
        #[arg(value_parser = secret)]
        password: Secret<String>,
        /// student or host
        #[arg(default_value = "student")]
        role: Role,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Search listings.
    Listings(ListingFilters),
    /// Show one listing with its rating.
    Listing { id: Id },
    /// Request a booking.
    Book {
        listing: Id,
        #[arg(value_name = "YYYY-MM-DD")]
        check_in: NaiveDate,
        #[arg(value_name = "YYYY-MM-DD")]
        check_out: NaiveDate,
        #[arg(default_value_t = 1)]
        guests: u32,
    },
    /// List your bookings.
    Bookings,
    /// Cancel a booking.
    Cancel { id: Id },
    /// List reviews for a listing.
    Reviews { listing: Id },
    /// Review a listing.
    Review {
        listing: Id,
        rating: u8,
        #[arg(allow_hyphen_values = true)]
        comment: String,
    },
    /// List saved listings.
    Wishlist,
    /// Save a listing to the wishlist.
    Save { listing: Id },
    /// Remove a listing from the wishlist.
    Unsave { listing: Id },
    /// Host earnings summary and transactions.
    Earnings,
}

impl Command {
    /// Route the command runs at.
    pub fn route(&self) -> &'static str {
        match self {
            Command::Login { .. } => "/login",
            Command::Signup { .. } => "/signup",
            Command::Logout => "/dashboard",
            Command::Whoami => "/profile",
            Command::Listings(_) | Command::Listing { .. } | Command::Reviews { .. } | Command::Review { .. } => {
                "/accommodations"
            }
            Command::Book { .. } | Command::Bookings | Command::Cancel { .. } => "/bookings",
            Command::Wishlist | Command::Save { .. } | Command::Unsave { .. } => "/wishlist",
            Command::Earnings => "/host/earnings",
        }
    }
}

/// `listings` search options.
#[derive(Debug, Clone, Default, Args)]
pub struct ListingFilters {
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long, value_name = "amount")]
    pub min_price: Option<f64>,
    #[arg(long, value_name = "amount")]
    pub max_price: Option<f64>,
    #[arg(long)]
    pub room_type: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
}

impl From<ListingFilters> for SearchFilters {
    fn from(filters: ListingFilters) -> Self {
        SearchFilters {
            city: filters.city,
            min_price: filters.min_price,
            max_price: filters.max_price,
            room_type: filters.room_type,
            page: filters.page,
            ..SearchFilters::default()
        }
    }
}

fn secret(value: &str) -> Result<Secret<String>, Infallible> {
    Ok(Secret::from(value))
}
