//! テスト用のセクション組み立て。

/// 記述子を組み立てる。
pub fn build_descriptor(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![tag, payload.len() as u8];
    buf.extend_from_slice(payload);
    buf
}

/// 短形式イベント記述子を組み立てる。
pub fn short_event(lang: &str, name: &str, text: &str) -> Vec<u8> {
    let mut payload = lang.as_bytes().to_vec();
    payload.push(name.len() as u8);
    payload.extend_from_slice(name.as_bytes());
    payload.push(text.len() as u8);
    payload.extend_from_slice(text.as_bytes());
    build_descriptor(0x4D, &payload)
}

/// 拡張形式イベント記述子を組み立てる。
pub fn extended_event(
    number: u8,
    last_number: u8,
    lang: &str,
    items: &[(&str, &str)],
    text: &str,
) -> Vec<u8> {
    let mut items_data = Vec::new();
    for (desc, item) in items {
        items_data.push(desc.len() as u8);
        items_data.extend_from_slice(desc.as_bytes());
        items_data.push(item.len() as u8);
        items_data.extend_from_slice(item.as_bytes());
    }

    let mut payload = vec![(number << 4) | last_number];
    payload.extend_from_slice(lang.as_bytes());
    payload.push(items_data.len() as u8);
    payload.extend_from_slice(&items_data);
    payload.push(text.len() as u8);
    payload.extend_from_slice(text.as_bytes());
    build_descriptor(0x4E, &payload)
}

/// コンテント記述子を組み立てる。
pub fn content(genres: &[(u8, u8)]) -> Vec<u8> {
    let payload: Vec<u8> = genres
        .iter()
        .flat_map(|&(l1, l2)| [(l1 << 4) | l2, 0])
        .collect();
    build_descriptor(0x54, &payload)
}

/// コンポーネント記述子を組み立てる。
pub fn component(stream_content: u8, component_type: u8) -> Vec<u8> {
    build_descriptor(0x50, &[stream_content, component_type, 0x01, b'e', b'n', b'g'])
}

/// EITのイベントを組み立てる。
pub fn build_event(
    event_id: u16,
    start_time: [u8; 5],
    duration: [u8; 3],
    running_status: u8,
    descriptors: &[u8],
) -> Vec<u8> {
    let mut buf = event_id.to_be_bytes().to_vec();
    buf.extend_from_slice(&start_time);
    buf.extend_from_slice(&duration);
    let loop_len = descriptors.len() as u16 | (running_status as u16) << 13;
    buf.extend_from_slice(&loop_len.to_be_bytes());
    buf.extend_from_slice(descriptors);
    buf
}

/// EITのセクションをCRC付きで組み立てる。
///
/// セクション番号は0、最終テーブル識別は`table_id`とする。
pub fn build_section(
    table_id: u8,
    service_id: u16,
    version: u8,
    transport_stream_id: u16,
    original_network_id: u16,
    events: &[u8],
) -> Vec<u8> {
    build_section_with(table_id, service_id, version, 0, transport_stream_id, original_network_id, events)
}

/// セクション番号を指定してEITのセクションをCRC付きで組み立てる。
pub fn build_section_with(
    table_id: u8,
    service_id: u16,
    version: u8,
    section_number: u8,
    transport_stream_id: u16,
    original_network_id: u16,
    events: &[u8],
) -> Vec<u8> {
    let section_length = (5 + 6 + events.len() + 4) as u16;
    let mut buf = vec![table_id];
    buf.extend_from_slice(&(0xF000 | section_length).to_be_bytes());
    buf.extend_from_slice(&service_id.to_be_bytes());
    buf.push(0xC0 | (version & 0x1F) << 1 | 0x01);
    buf.push(section_number);
    buf.push(section_number);
    buf.extend_from_slice(&transport_stream_id.to_be_bytes());
    buf.extend_from_slice(&original_network_id.to_be_bytes());
    buf.push(section_number);
    buf.push(table_id);
    buf.extend_from_slice(events);

    let crc = crate::crc::calc32(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    buf
}
