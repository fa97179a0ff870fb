use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("kunci")
        .about("User authentication backend with email OTP verification")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("KUNCI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string, or `memory` for the in-process store")
                .env("KUNCI_DSN")
                .required(true),
        )
        .arg(
            Arg::new("from-email")
                .long("from-email")
                .help("From address for outbound notifications")
                .default_value("no-reply@localhost.localdomain")
                .env("KUNCI_FROM_EMAIL"),
        )
        .arg(
            Arg::new("smtp-host")
                .long("smtp-host")
                .help("SMTP relay host; when absent outbound mail is logged instead of sent")
                .env("KUNCI_SMTP_HOST"),
        )
        .arg(
            Arg::new("smtp-username")
                .long("smtp-username")
                .help("SMTP relay username")
                .env("KUNCI_SMTP_USERNAME")
                .requires("smtp-host"),
        )
        .arg(
            Arg::new("smtp-password")
                .long("smtp-password")
                .help("SMTP relay password")
                .env("KUNCI_SMTP_PASSWORD")
                .requires("smtp-username"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (use multiple times)")
                .action(ArgAction::Count),
        )
}
