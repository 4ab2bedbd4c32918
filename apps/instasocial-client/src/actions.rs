use instasocial::model::PostId;
use instasocial::state::View;

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    Go(View),
    Refresh,
    Username(String),
    Bio(String),
    CreateProfile,
    Content(String),
    Image(String),
    Publish,
    Comment(String),
    Like(PostId),
    Tip(PostId),
    Mint,
    Help,
    Quit,
    None,
    Unknown(String),
}

fn bad_post_id(arg: &str) -> Action {
    Action::Unknown(format!("expected a post id, got {:?}", arg.trim()))
}

impl Action {
    pub fn from_line(line: &str) -> Action {
        let line = line.trim_end_matches(['\r', '\n']);
        let (word, rest) = match line.trim_start().split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (line.trim(), ""),
        };
        match word {
            "" => Action::None,
            "connect" | "c" => Action::Connect,
            "disconnect" => Action::Disconnect,
            "feed" | "f" => Action::Go(View::Feed),
            "new" | "n" => Action::Go(View::CreatePost),
            "profile" | "p" => Action::Go(View::Profile),
            "refresh" | "r" => Action::Refresh,
            "username" => Action::Username(rest.to_string()),
            "bio" => Action::Bio(rest.to_string()),
            "register" => Action::CreateProfile,
            "content" => Action::Content(rest.to_string()),
            "image" => Action::Image(rest.trim().to_string()),
            "post" => Action::Publish,
            "comment" => Action::Comment(rest.to_string()),
            "like" | "l" => rest.trim().parse().map(Action::Like).unwrap_or_else(|_| bad_post_id(rest)),
            "tip" | "t" => rest.trim().parse().map(Action::Tip).unwrap_or_else(|_| bad_post_id(rest)),
            "mint" => Action::Mint,
            "help" | "h" | "?" => Action::Help,
            "quit" | "q" | "exit" => Action::Quit,
            other => Action::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "\
commands:
  connect                  connect the wallet
  username <name>          set the username draft
  bio <text>               set the bio draft
  register                 create the profile from the drafts
  feed | new | profile     switch view
  content <text>           set the post text
  image <url>              set the post image URL
  post                     publish the post draft
  like <id> | tip <id>     react to a post
  comment <text>           edit the comment draft
  mint                     mint the profile NFT
  refresh                  reload the feed now
  disconnect | quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(Action::from_line("like 7\n"), Action::Like(7));
        assert_eq!(Action::from_line("tip  12"), Action::Tip(12));
        assert_eq!(Action::from_line("content hello world"), Action::Content("hello world".into()));
        assert_eq!(Action::from_line("content"), Action::Content(String::new()));
        assert_eq!(Action::from_line("new"), Action::Go(View::CreatePost));
        assert_eq!(Action::from_line("   "), Action::None);
    }

    #[test]
    fn bad_post_id_is_reported() {
        assert!(matches!(Action::from_line("like abc"), Action::Unknown(msg) if msg.contains("\"abc\"")));
        assert_eq!(Action::from_line("dance"), Action::Unknown("dance".into()));
    }
}
