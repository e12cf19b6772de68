//! 番組名と番組記述の後処理。

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use smallvec::{smallvec, SmallVec};

/// 番組名の末尾と番組記述の先頭に付けられる、続きがあることを示す記号。
pub const CONTINUATION: &str = "...";

/// 途中で切れた番組名を番組記述の先頭で補い、番組名と残りの番組記述を返す。
///
/// 番組名が`...`で終わり、番組記述が`...`で始まる場合に、
/// 番組記述の最初の文末記号までを番組名に連結する。文末記号がなければ`None`を返す。
pub fn join_title_continuation(title: &str, description: &str) -> Option<(String, String)> {
    let head = title.strip_suffix(CONTINUATION)?;
    let tail = description.strip_prefix(CONTINUATION)?;

    let end = tail.find(['.', '!', '?', ':'])?;
    let punct = &tail[end..end + 1];
    let kept = if punct == "!" || punct == "?" { punct } else { "" };

    let head = head.trim_end();
    let rest_of_title = tail[..end].trim();
    let title = if rest_of_title.is_empty() {
        format!("{}{}", head, kept)
    } else {
        format!("{} {}{}", head, rest_of_title, kept)
    };
    let description = tail[end + 1..].trim().to_owned();
    Some((title, description))
}

/// コロンの位置として許容する文字単位の範囲。
pub const SUBTITLE_COLON_RANGE: std::ops::RangeInclusive<usize> = 5..=60;

/// 番組記述をコロンの前の副題と後の記述に分割する。
///
/// 最初のコロンの文字位置が5～60でなければ`None`を返す。
pub fn split_subtitle(description: &str) -> Option<(String, String)> {
    let (char_index, (byte_index, _)) = description
        .char_indices()
        .enumerate()
        .find(|(_, (_, c))| *c == ':')?;
    if !SUBTITLE_COLON_RANGE.contains(&char_index) {
        return None;
    }

    let subtitle = description[..byte_index].trim();
    let rest = description[byte_index + 1..].trim();
    if subtitle.is_empty() {
        return None;
    }
    Some((subtitle.to_owned(), rest.to_owned()))
}

/// シーズン番号とエピソード番号の表記法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonEpisodeGrammar {
    /// `(S3 Ep5)`や`(Ep5)`。
    Bracket,
    /// オーストラリアの`Series 3`と`Episode 5`。
    Australia,
    /// ニュージーランドの`Season 3`と`Ep 5`。
    NewZealand,
}

impl SeasonEpisodeGrammar {
    /// 国コードに対応する表記法を返す。
    pub fn for_country(country: Option<&str>) -> SeasonEpisodeGrammar {
        match country.map(str::to_ascii_uppercase).as_deref() {
            Some("AUS") => SeasonEpisodeGrammar::Australia,
            Some("NZL") => SeasonEpisodeGrammar::NewZealand,
            _ => SeasonEpisodeGrammar::Bracket,
        }
    }

    /// `text`からシーズン番号とエピソード番号を探す。
    ///
    /// 表記の途中で形式が崩れている場合は見つからなかったものとする。
    pub fn scan(&self, text: &str) -> Option<SeasonEpisode> {
        match self {
            SeasonEpisodeGrammar::Bracket => scan_bracket(text),
            SeasonEpisodeGrammar::Australia => scan_labeled(text, &SERIES_REGEX, &EPISODE_REGEX),
            SeasonEpisodeGrammar::NewZealand => scan_labeled(text, &SEASON_REGEX, &EP_REGEX),
        }
    }

    /// 番組記述に付加する表記を返す。
    pub fn format(&self, season: Option<u32>, episode: Option<u32>) -> Option<String> {
        let s = match (self, season, episode) {
            (_, None, None) => return None,
            (SeasonEpisodeGrammar::Bracket, Some(s), Some(e)) => format!("(S{} Ep{})", s, e),
            (SeasonEpisodeGrammar::Bracket, Some(s), None) => format!("(S{})", s),
            (SeasonEpisodeGrammar::Bracket, None, Some(e)) => format!("(Ep{})", e),
            (SeasonEpisodeGrammar::Australia, Some(s), Some(e)) => {
                format!("Series {} Episode {}", s, e)
            }
            (SeasonEpisodeGrammar::Australia, Some(s), None) => format!("Series {}", s),
            (SeasonEpisodeGrammar::Australia, None, Some(e)) => format!("Episode {}", e),
            (SeasonEpisodeGrammar::NewZealand, Some(s), Some(e)) => format!("Season {} Ep {}", s, e),
            (SeasonEpisodeGrammar::NewZealand, Some(s), None) => format!("Season {}", s),
            (SeasonEpisodeGrammar::NewZealand, None, Some(e)) => format!("Ep {}", e),
        };
        Some(s)
    }
}

/// 文字列中に見つかったシーズン番号とエピソード番号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonEpisode {
    /// シーズン番号。
    pub season: Option<u32>,
    /// エピソード番号。
    pub episode: Option<u32>,
    /// 表記が占めるバイト範囲（昇順）。
    ///
    /// シーズン番号とエピソード番号が離れて書かれている場合はそれぞれの範囲を持つ。
    pub spans: SmallVec<[Range<usize>; 2]>,
}

impl SeasonEpisode {
    /// `text`から表記を取り除く。
    ///
    /// 表記の間にある文章はそのまま残し、取り除いた表記の直後にある区切りは詰める。
    pub fn strip_from(&self, text: &str) -> String {
        let mut s = String::with_capacity(text.len());
        let mut pos = 0;
        for span in &self.spans {
            if pos == 0 {
                s.push_str(text[..span.start].trim_end());
            } else {
                push_remainder(&mut s, &text[pos..span.start]);
            }
            pos = span.end;
        }
        push_remainder(&mut s, &text[pos..]);
        s
    }
}

#[inline]
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-')
}

fn push_remainder(s: &mut String, rest: &str) {
    let mut rest = rest.trim();
    if s.is_empty() {
        rest = rest.trim_start_matches(is_separator);
    }
    if rest.is_empty() {
        return;
    }

    if !s.is_empty() && !rest.starts_with(['.', ',', ';', ':']) {
        s.push(' ');
    }
    s.push_str(rest);
}

/// 括弧書きの表記の開始。
static BRACKET_START_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?:S[0-9]|Ep)").unwrap());

static BRACKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\((?:S(?P<season>[0-9]+) ?)?Ep(?P<episode>[0-9]+)\)").unwrap()
});

// 見出し語の後に数値がなければ`number`は一致しない
static SERIES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSeries(?: *(?P<number>[0-9]+)|\b)").unwrap());
static EPISODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bEpisode(?: *(?P<number>[0-9]+)|\b)").unwrap());
static SEASON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSeason(?: *(?P<number>[0-9]+)|\b)").unwrap());
static EP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bEp(?: *(?P<number>[0-9]+)|\b)").unwrap());

fn scan_bracket(text: &str) -> Option<SeasonEpisode> {
    let start = BRACKET_START_REGEX.find(text)?.start();
    let Some(caps) = BRACKET_REGEX.captures(&text[start..]) else {
        log::debug!("malformed season/episode {:?}", &text[start..]);
        return None;
    };

    let number = |name: &str| -> Option<u32> { caps.name(name)?.as_str().parse().ok() };
    let episode = number("episode")?;
    let span = caps.get_match().range();
    Some(SeasonEpisode {
        season: number("season"),
        episode: Some(episode),
        spans: smallvec![start + span.start..start + span.end],
    })
}

/// `regex`の見出し語を探し、続く数値と表記の範囲を返す。
///
/// 見出し語がない場合は`Ok(None)`、数値が続かない場合は`Err(())`を返す。
fn find_labeled(regex: &Regex, text: &str) -> Result<Option<(u32, Range<usize>)>, ()> {
    let Some(caps) = regex.captures(text) else {
        return Ok(None);
    };
    let number = caps.name("number").ok_or(())?;
    let number = number.as_str().parse().map_err(|_| ())?;
    Ok(Some((number, caps.get_match().range())))
}

fn scan_labeled(text: &str, season_regex: &Regex, episode_regex: &Regex) -> Option<SeasonEpisode> {
    let (Ok(season), Ok(episode)) = (
        find_labeled(season_regex, text),
        find_labeled(episode_regex, text),
    ) else {
        log::debug!("malformed season/episode {:?}", text);
        return None;
    };

    let mut spans: SmallVec<[Range<usize>; 2]> = match (&season, &episode) {
        (None, None) => return None,
        // 区切りだけを挟んで続く組はまとめて1つの表記とする
        (Some((_, s)), Some((_, e)))
            if s.end <= e.start && text[s.end..e.start].chars().all(is_separator) =>
        {
            smallvec![s.start..e.end]
        }
        _ => [&season, &episode]
            .into_iter()
            .flatten()
            .map(|(_, span)| span.clone())
            .collect(),
    };
    spans.sort_unstable_by_key(|span| span.start);

    Some(SeasonEpisode {
        season: season.map(|(n, _)| n),
        episode: episode.map(|(n, _)| n),
        spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_continuation() {
        assert_eq!(
            join_title_continuation("Doctor Who and the...", "...Daleks. The Doctor returns."),
            Some(("Doctor Who and the Daleks".to_owned(), "The Doctor returns.".to_owned())),
        );
        assert_eq!(
            join_title_continuation("Who Wants To Be A...", "...Millionaire? Quiz show."),
            Some(("Who Wants To Be A Millionaire?".to_owned(), "Quiz show.".to_owned())),
        );
        assert_eq!(join_title_continuation("Title...", "...no punctuation"), None);
        assert_eq!(join_title_continuation("Title", "...Rest. More"), None);
    }

    #[test]
    fn test_split_subtitle() {
        assert_eq!(
            split_subtitle("Part One: the beginning"),
            Some(("Part One".to_owned(), "the beginning".to_owned())),
        );
        assert_eq!(split_subtitle("(no colon here)"), None);
        // コロンが先頭に近すぎる
        assert_eq!(split_subtitle("Re: something"), None);
        // コロンが遠すぎる
        let long = format!("{}: rest", "x".repeat(61));
        assert_eq!(split_subtitle(&long), None);
        // 文字単位で数える
        assert_eq!(
            split_subtitle("Ésope: fables"),
            Some(("Ésope".to_owned(), "fables".to_owned())),
        );
    }

    #[test]
    fn test_grammar_for_country() {
        assert_eq!(SeasonEpisodeGrammar::for_country(Some("aus")), SeasonEpisodeGrammar::Australia);
        assert_eq!(SeasonEpisodeGrammar::for_country(Some("NZL")), SeasonEpisodeGrammar::NewZealand);
        assert_eq!(SeasonEpisodeGrammar::for_country(Some("GBR")), SeasonEpisodeGrammar::Bracket);
        assert_eq!(SeasonEpisodeGrammar::for_country(None), SeasonEpisodeGrammar::Bracket);
    }

    #[test]
    fn test_bracket() {
        let g = SeasonEpisodeGrammar::Bracket;
        let text = "The crew returns. (S3 Ep5)";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(3), Some(5)));
        assert_eq!(found.strip_from(text), "The crew returns.");

        let found = g.scan("(Ep12) Pilot").unwrap();
        assert_eq!((found.season, found.episode), (None, Some(12)));
        assert_eq!(found.strip_from("(Ep12) Pilot"), "Pilot");

        assert_eq!(g.scan("(S3 Ep)"), None);
        assert_eq!(g.scan("(S3)"), None);
        assert_eq!(g.scan("(Sunday) (Special)"), None);
    }

    #[test]
    fn test_australia() {
        let g = SeasonEpisodeGrammar::Australia;
        let text = "Drama. Series 2 Episode 7";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(2), Some(7)));
        assert_eq!(found.spans.as_slice(), [7..25]);
        assert_eq!(found.strip_from(text), "Drama.");

        let text = "Episode 4, the finale";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (None, Some(4)));
        assert_eq!(found.strip_from(text), "the finale");

        // 形式が崩れていれば見つからない
        assert_eq!(g.scan("Series 2 Episode"), None);
        assert_eq!(g.scan("Miniseries finale"), None);
        assert_eq!(g.scan("No numbers here"), None);
    }

    #[test]
    fn test_australia_apart() {
        let g = SeasonEpisodeGrammar::Australia;
        let text = "Series 2 returns with a new cast and a new home. Catch Episode 7 tonight.";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(2), Some(7)));
        assert_eq!(found.spans.len(), 2);
        assert_eq!(
            found.strip_from(text),
            "returns with a new cast and a new home. Catch tonight.",
        );

        // 片方だけが文中にある
        let text = "The gang is back for Series 3 of the comedy.";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(3), None));
        assert_eq!(found.strip_from(text), "The gang is back for of the comedy.");

        let text = "Catch up on Episode 12. Drama.";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (None, Some(12)));
        assert_eq!(found.strip_from(text), "Catch up on. Drama.");
    }

    #[test]
    fn test_new_zealand() {
        let g = SeasonEpisodeGrammar::NewZealand;
        let text = "Season 5, Ep 10. Cooking";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(5), Some(10)));
        assert_eq!(found.spans.as_slice(), [0..15]);
        assert_eq!(found.strip_from(text), "Cooking");

        let found = g.scan("Ep10 - Finale").unwrap();
        assert_eq!((found.season, found.episode), (None, Some(10)));
        assert_eq!(found.strip_from("Ep10 - Finale"), "Finale");

        assert_eq!(g.scan("Season finale"), None);
        // `Episode`は`Ep`として扱わない
        assert_eq!(g.scan("Episode 3"), None);
    }

    #[test]
    fn test_new_zealand_reversed() {
        let g = SeasonEpisodeGrammar::NewZealand;
        let text = "Ep 4 of the cooking contest. Season 2 continues";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(2), Some(4)));
        assert_eq!(found.spans.as_slice(), [0..4, 29..37]);
        assert_eq!(found.strip_from(text), "of the cooking contest. continues");

        // 逆順で続く組は間の区切りも詰める
        let text = "Ep 4: Season 2. Finale";
        let found = g.scan(text).unwrap();
        assert_eq!((found.season, found.episode), (Some(2), Some(4)));
        assert_eq!(found.spans.len(), 2);
        assert_eq!(found.strip_from(text), "Finale");
    }

    #[test]
    fn test_format() {
        let g = SeasonEpisodeGrammar::Bracket;
        assert_eq!(g.format(Some(3), Some(5)).as_deref(), Some("(S3 Ep5)"));
        assert_eq!(g.format(None, Some(5)).as_deref(), Some("(Ep5)"));
        assert_eq!(g.format(None, None), None);
        assert_eq!(
            SeasonEpisodeGrammar::Australia.format(Some(1), Some(2)).as_deref(),
            Some("Series 1 Episode 2"),
        );
        assert_eq!(
            SeasonEpisodeGrammar::NewZealand.format(Some(1), None).as_deref(),
            Some("Season 1"),
        );
    }
}
