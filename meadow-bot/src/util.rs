pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated list of store item ids, e.g. `26,18,24`.
pub fn parse_item_ids(s: &str) -> Result<Vec<u32>, String> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| format!("invalid item id `{token}`"))
        })
        .collect()
}
