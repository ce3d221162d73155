use std::path::PathBuf;

use alpha_metrics::probe::{
    contract_from_page_url, parse_amount, parse_first_number, FileProbe, PageProbe, AMOUNT_FILE,
    BALANCE_FILE, PAGE_URL_FILE,
};

fn probe_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("alpha-probe-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn contract_is_taken_after_chain_segment() {
    assert_eq!(
        contract_from_page_url("https://www.binance.com/zh-CN/alpha/bsc/0xABCdef0123?ref=x"),
        Some("0xabcdef0123".to_string())
    );
    assert_eq!(
        contract_from_page_url("/en/alpha/sol/TokenMint111#chart"),
        Some("tokenmint111".to_string())
    );
    assert_eq!(contract_from_page_url("https://www.binance.com/en/alpha/bsc"), None);
    assert_eq!(contract_from_page_url("https://www.binance.com/en/markets"), None);
}

#[test]
fn amounts_must_be_positive() {
    assert_eq!(parse_amount("25.5"), Some(25.5));
    assert_eq!(parse_amount("-25.5"), Some(25.5));
    assert_eq!(parse_amount("0"), None);
    assert_eq!(parse_amount(""), None);
    assert_eq!(parse_first_number("Available: 12,000 USDT"), Some(12_000.0));
}

#[test]
fn file_probe_reads_each_signal() {
    let dir = probe_dir("signals");
    let probe = FileProbe::new(&dir);
    assert_eq!(probe.balance(), None);
    assert_eq!(probe.amount(), None);
    assert_eq!(probe.page_url(), None);

    std::fs::write(dir.join(BALANCE_FILE), "1,234.56 USDT\n").unwrap();
    std::fs::write(dir.join(AMOUNT_FILE), "  40 ").unwrap();
    std::fs::write(dir.join(PAGE_URL_FILE), "https://www.binance.com/en/alpha/bsc/0xabc\n").unwrap();

    assert_eq!(probe.balance(), Some(1_234.56));
    assert_eq!(probe.amount(), Some(40.0));
    assert_eq!(
        probe.page_url().as_deref().and_then(contract_from_page_url),
        Some("0xabc".to_string())
    );

    std::fs::write(dir.join(PAGE_URL_FILE), "   ").unwrap();
    assert_eq!(probe.page_url(), None);
    let _ = std::fs::remove_dir_all(&dir);
}
