//! 視聴年齢制限の表示名。

use crate::psi::desc::{BellRatingDescriptor, ParentalRating};

/// オーストラリアの放送で使われる視聴年齢制限の値と表示名。
const AUSTRALIA: &[(u8, &str)] = &[
    (0x01, "P"),
    (0x02, "C"),
    (0x05, "G"),
    (0x08, "PG"),
    (0x0A, "M"),
    (0x0C, "MA15+"),
    (0x0D, "AV15+"),
    (0x0F, "R18+"),
];

/// カナダの視聴年齢制限（0～6）の表示名。
const CANADA: [&str; 7] = ["E", "C", "C8", "G", "PG", "14+", "18+"];

/// 視聴年齢制限を`country`の表記に変換する。
///
/// 表記が定義されていない国では最少年齢をそのまま返す。
pub fn parental_rating_label(country: Option<&str>, rating: &ParentalRating) -> Option<String> {
    if country.is_some_and(|c| c.eq_ignore_ascii_case("AUS")) {
        if let Some((_, label)) = AUSTRALIA.iter().find(|(value, _)| *value == rating.rating) {
            return Some((*label).to_owned());
        }
    }

    rating.min_age().map(|age| age.to_string())
}

/// Bell TVの視聴年齢制限の表示名を返す。
pub fn bell_rating_label(desc: &BellRatingDescriptor) -> Option<&'static str> {
    CANADA.get(desc.parental_rating as usize).copied()
}

/// Bell TVの番組評価にある注意事項を返す。
pub fn bell_advisories(desc: &BellRatingDescriptor) -> Vec<&'static str> {
    [
        (desc.sexual_content, "sexual content"),
        (desc.strong_language, "strong language"),
        (desc.violence, "violence"),
        (desc.nudity, "nudity"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(rating: u8) -> ParentalRating {
        ParentalRating {
            country_code: *b"AUS",
            rating,
        }
    }

    #[test]
    fn test_parental_rating_label() {
        assert_eq!(parental_rating_label(Some("AUS"), &rating(0x0A)).as_deref(), Some("M"));
        assert_eq!(parental_rating_label(Some("aus"), &rating(0x0F)).as_deref(), Some("R18+"));
        // 表にない値は年齢
        assert_eq!(parental_rating_label(Some("AUS"), &rating(0x03)).as_deref(), Some("6"));
        assert_eq!(parental_rating_label(Some("GBR"), &rating(0x0C)).as_deref(), Some("15"));
        assert_eq!(parental_rating_label(None, &rating(0x00)), None);
        assert_eq!(parental_rating_label(None, &rating(0x10)), None);
    }

    #[test]
    fn test_bell() {
        let mut desc = BellRatingDescriptor {
            parental_rating: 5,
            star_rating: 7,
            sexual_content: false,
            strong_language: true,
            violence: true,
            nudity: false,
        };
        assert_eq!(bell_rating_label(&desc), Some("14+"));
        assert_eq!(bell_advisories(&desc), ["strong language", "violence"]);

        desc.parental_rating = 7;
        assert_eq!(bell_rating_label(&desc), None);
    }
}
