//! 番組のカテゴリ。

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::psi::table::{NetworkId, ServiceId, TransportStreamId};

/// コンテント記述子のジャンルに対応するカテゴリ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCategory {
    /// ジャンル1。
    pub content_type: u8,
    /// ジャンル2。
    pub subtype: u8,
    /// カテゴリ名。
    pub label: String,
    /// 使用された回数。
    pub usage: u64,
    /// 最初に使用された番組名。
    pub sample_title: Option<String>,
}

/// ジャンルとカテゴリ名の対応表の設定による上書き。
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CategoryOverride {
    /// ジャンル1。
    pub content_type: u8,
    /// ジャンル2。
    pub subtype: u8,
    /// カテゴリ名。
    pub label: String,
}

// EN 300 468 Table 29
const STANDARD_LABELS: &[(u8, u8, &str)] = &[
    (0x1, 0x0, "Movie/Drama"),
    (0x1, 0x1, "Detective/Thriller"),
    (0x1, 0x2, "Adventure/Western/War"),
    (0x1, 0x3, "Science Fiction/Fantasy/Horror"),
    (0x1, 0x4, "Comedy"),
    (0x1, 0x5, "Soap/Melodrama/Folklore"),
    (0x1, 0x6, "Romance"),
    (0x1, 0x7, "Serious/Classical/Religious/Historical Movie/Drama"),
    (0x1, 0x8, "Adult Movie/Drama"),
    (0x2, 0x0, "News/Current Affairs"),
    (0x2, 0x1, "News/Weather Report"),
    (0x2, 0x2, "News Magazine"),
    (0x2, 0x3, "Documentary"),
    (0x2, 0x4, "Discussion/Interview/Debate"),
    (0x3, 0x0, "Show/Game Show"),
    (0x3, 0x1, "Game Show/Quiz/Contest"),
    (0x3, 0x2, "Variety Show"),
    (0x3, 0x3, "Talk Show"),
    (0x4, 0x0, "Sports"),
    (0x4, 0x1, "Special Events"),
    (0x4, 0x2, "Sports Magazines"),
    (0x4, 0x3, "Football/Soccer"),
    (0x4, 0x4, "Tennis/Squash"),
    (0x4, 0x5, "Team Sports"),
    (0x4, 0x6, "Athletics"),
    (0x4, 0x7, "Motor Sport"),
    (0x4, 0x8, "Water Sport"),
    (0x4, 0x9, "Winter Sports"),
    (0x4, 0xA, "Equestrian"),
    (0x4, 0xB, "Martial Sports"),
    (0x5, 0x0, "Children's/Youth Programmes"),
    (0x5, 0x1, "Pre-school Children's Programmes"),
    (0x5, 0x2, "Entertainment Programmes for 6 to 14"),
    (0x5, 0x3, "Entertainment Programmes for 10 to 16"),
    (0x5, 0x4, "Informational/Educational/School Programmes"),
    (0x5, 0x5, "Cartoons/Puppets"),
    (0x6, 0x0, "Music/Ballet/Dance"),
    (0x6, 0x1, "Rock/Pop"),
    (0x6, 0x2, "Serious Music/Classical Music"),
    (0x6, 0x3, "Folk/Traditional Music"),
    (0x6, 0x4, "Jazz"),
    (0x6, 0x5, "Musical/Opera"),
    (0x6, 0x6, "Ballet"),
    (0x7, 0x0, "Arts/Culture"),
    (0x7, 0x1, "Performing Arts"),
    (0x7, 0x2, "Fine Arts"),
    (0x7, 0x3, "Religion"),
    (0x7, 0x4, "Popular Culture/Traditional Arts"),
    (0x7, 0x5, "Literature"),
    (0x7, 0x6, "Film/Cinema"),
    (0x7, 0x7, "Experimental Film/Video"),
    (0x7, 0x8, "Broadcasting/Press"),
    (0x7, 0x9, "New Media"),
    (0x7, 0xA, "Arts/Culture Magazines"),
    (0x7, 0xB, "Fashion"),
    (0x8, 0x0, "Social/Political Issues/Economics"),
    (0x8, 0x1, "Magazines/Reports/Documentary"),
    (0x8, 0x2, "Economics/Social Advisory"),
    (0x8, 0x3, "Remarkable People"),
    (0x9, 0x0, "Education/Science/Factual Topics"),
    (0x9, 0x1, "Nature/Animals/Environment"),
    (0x9, 0x2, "Technology/Natural Sciences"),
    (0x9, 0x3, "Medicine/Physiology/Psychology"),
    (0x9, 0x4, "Foreign Countries/Expeditions"),
    (0x9, 0x5, "Social/Spiritual Sciences"),
    (0x9, 0x6, "Further Education"),
    (0x9, 0x7, "Languages"),
    (0xA, 0x0, "Leisure Hobbies"),
    (0xA, 0x1, "Tourism/Travel"),
    (0xA, 0x2, "Handicraft"),
    (0xA, 0x3, "Motoring"),
    (0xA, 0x4, "Fitness and Health"),
    (0xA, 0x5, "Cooking"),
    (0xA, 0x6, "Advertisement/Shopping"),
    (0xA, 0x7, "Gardening"),
    (0xB, 0x0, "Original Language"),
    (0xB, 0x1, "Black and White"),
    (0xB, 0x2, "Unpublished"),
    (0xB, 0x3, "Live Broadcast"),
    (0xB, 0x4, "Plano-stereoscopic"),
    (0xB, 0x5, "Local or Regional"),
];

/// ジャンルとカテゴリ名の対応表。
///
/// 対応表はデコードの文脈ごとに持ち、使用回数もその中で数える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: IndexMap<(u8, u8), ContentCategory>,
}

impl Default for CategoryTable {
    fn default() -> CategoryTable {
        CategoryTable::standard()
    }
}

impl CategoryTable {
    /// EN 300 468で規定される対応表を生成する。
    pub fn standard() -> CategoryTable {
        let entries = STANDARD_LABELS
            .iter()
            .map(|&(content_type, subtype, label)| {
                let category = ContentCategory {
                    content_type,
                    subtype,
                    label: label.to_owned(),
                    usage: 0,
                    sample_title: None,
                };
                ((content_type, subtype), category)
            })
            .collect();
        CategoryTable { entries }
    }

    /// 標準の対応表を`overrides`で上書きした対応表を生成する。
    pub fn with_overrides(overrides: &[CategoryOverride]) -> CategoryTable {
        let mut table = CategoryTable::standard();
        for o in overrides {
            table
                .entries
                .entry((o.content_type, o.subtype))
                .and_modify(|c| c.label.clone_from(&o.label))
                .or_insert_with(|| ContentCategory {
                    content_type: o.content_type,
                    subtype: o.subtype,
                    label: o.label.clone(),
                    usage: 0,
                    sample_title: None,
                });
        }
        table
    }

    /// ジャンルに対応するカテゴリを返す。
    #[inline]
    pub fn find_content(&self, content_type: u8, subtype: u8) -> Option<&ContentCategory> {
        self.entries.get(&(content_type, subtype))
    }

    /// ジャンルに対応するカテゴリの使用回数を増やし、そのカテゴリを返す。
    ///
    /// 初めて使用された場合は`title`を見本として記録する。
    pub fn record_usage(
        &mut self,
        content_type: u8,
        subtype: u8,
        title: Option<&str>,
    ) -> Option<&ContentCategory> {
        let category = self.entries.get_mut(&(content_type, subtype))?;
        category.usage += 1;
        if category.sample_title.is_none() {
            category.sample_title = title.map(str::to_owned);
        }
        Some(category)
    }

    /// 対応表のカテゴリを定義順に返す。
    pub fn iter(&self) -> impl Iterator<Item = &ContentCategory> {
        self.entries.values()
    }
}

/// 番組名や番組記述に含まれる語句によるカテゴリ。
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CustomCategory {
    /// カテゴリ名。
    pub label: String,
    /// 大文字小文字を区別せず照合する語句。
    pub patterns: Vec<String>,
}

impl CustomCategory {
    /// `text`がいずれかの語句を含むかどうか。
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.patterns
            .iter()
            .any(|p| !p.is_empty() && text.contains(&p.to_lowercase()))
    }
}

/// `categories`から`text`に一致する最初のカテゴリ名を返す。
pub fn find_custom<'c>(categories: &'c [CustomCategory], text: &str) -> Option<&'c str> {
    categories
        .iter()
        .find(|c| c.matches(text))
        .map(|c| c.label.as_str())
}

/// カテゴリの相互参照の鍵。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct CategoryKey {
    /// オリジナルネットワーク識別。
    pub original_network_id: NetworkId,
    /// トランスポートストリーム識別。
    pub transport_stream_id: TransportStreamId,
    /// サービス識別。
    pub service_id: ServiceId,
    /// 開始時間。
    pub start_time: chrono::NaiveDateTime,
}

/// カテゴリの相互参照の値。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategoryEntry {
    /// 番組名。
    pub event_name: String,
    /// ジャンル1。
    pub content_type: u8,
    /// ジャンル2。
    pub subtype: u8,
}

/// 番組とジャンルの相互参照。
///
/// 診断用であり、鍵で重複を除いて鍵の順に並べる。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategoryXref(BTreeMap<CategoryKey, CategoryEntry>);

impl CategoryXref {
    /// 相互参照を追加する。
    ///
    /// 同じ鍵が既にある場合は何もしない。
    pub fn insert(&mut self, key: CategoryKey, entry: CategoryEntry) {
        self.0.entry(key).or_insert(entry);
    }

    /// 相互参照の件数。
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 相互参照が空かどうか。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 相互参照を鍵の順に返す。
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryKey, &CategoryEntry)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let mut table = CategoryTable::standard();
        assert_eq!(table.find_content(1, 0).unwrap().label, "Movie/Drama");
        assert_eq!(table.find_content(4, 3).unwrap().label, "Football/Soccer");
        assert!(table.find_content(0xF, 0).is_none());

        table.record_usage(1, 0, Some("First"));
        let category = table.record_usage(1, 0, Some("Second")).unwrap();
        assert_eq!(category.usage, 2);
        assert_eq!(category.sample_title.as_deref(), Some("First"));
        assert!(table.record_usage(0xC, 0, None).is_none());
    }

    #[test]
    fn test_overrides() {
        let table = CategoryTable::with_overrides(&[
            CategoryOverride {
                content_type: 1,
                subtype: 0,
                label: "Film".to_owned(),
            },
            CategoryOverride {
                content_type: 0xF,
                subtype: 1,
                label: "Local".to_owned(),
            },
        ]);
        assert_eq!(table.find_content(1, 0).unwrap().label, "Film");
        assert_eq!(table.find_content(0xF, 1).unwrap().label, "Local");
        assert_eq!(table.iter().next().unwrap().label, "Film");
    }

    #[test]
    fn test_custom() {
        let categories = [
            CustomCategory {
                label: "Cooking".to_owned(),
                patterns: vec!["kitchen".to_owned(), "chef".to_owned()],
            },
            CustomCategory {
                label: "Empty".to_owned(),
                patterns: vec![String::new()],
            },
        ];
        assert_eq!(find_custom(&categories, "Hell's Kitchen"), Some("Cooking"));
        assert_eq!(find_custom(&categories, "News"), None);
    }

    #[test]
    fn test_xref() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let key = |sid| CategoryKey {
            original_network_id: NetworkId(1),
            transport_stream_id: TransportStreamId(2),
            service_id: ServiceId(sid),
            start_time: start,
        };
        let entry = |name: &str| CategoryEntry {
            event_name: name.to_owned(),
            content_type: 1,
            subtype: 0,
        };

        let mut xref = CategoryXref::default();
        xref.insert(key(20), entry("B"));
        xref.insert(key(10), entry("A"));
        xref.insert(key(20), entry("C"));
        assert_eq!(xref.len(), 2);
        let names: Vec<_> = xref.iter().map(|(_, e)| e.event_name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
