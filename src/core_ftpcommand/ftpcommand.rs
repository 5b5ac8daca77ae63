/// The command verbs the server recognizes.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    HELP,
    PWD,
    CWD,
    CDUP,
    PASV,
    EPSV,
    PORT,
    EPRT,
    LIST,
    RETR,
}

impl FtpCommand {
    pub fn from_str(verb: &str) -> Option<FtpCommand> {
        match verb.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "HELP" => Some(FtpCommand::HELP),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            "PORT" => Some(FtpCommand::PORT),
            "EPRT" => Some(FtpCommand::EPRT),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            _ => None,
        }
    }
}
