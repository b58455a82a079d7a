// src/screener/fixtures.rs
//! Rendered-page fixtures shared by the orchestration tests.

use crate::browser::scripted::{ClickEffect, Script};

pub const LOGIN_PAGE: &str = r#"
    <form method="post" action="/login/">
      <input type="text" name="username" id="id_username">
      <input type="password" name="password" id="id_password">
      <button class="button-primary" type="submit">Login</button>
    </form>
"#;

pub const SALES_CONTROL: &str =
    r#"section#quarters button[onclick="Company.showSchedule('Sales', 'quarters', this)"]"#;

const RATIOS: &str = r#"
    <div class="company-ratios">
      <ul id="top-ratios">
        <li><span class="name">Market Cap</span><span class="value">₹ <span class="number">12,345</span> Cr.</span></li>
        <li><span class="name">High / Low</span><span class="value">₹ <span class="number">980</span> / <span class="number">640</span></span></li>
        <li><span class="name">ROE</span><span class="value"><span class="number">14.2</span> %</span></li>
      </ul>
    </div>
"#;

fn quarters(expanded: bool) -> String {
    let children = if expanded {
        r#"<tr><td class="text" style="padding-left: 24px">Domestic</td><td>70</td><td>75</td><td>80</td></tr>
           <tr><td class="text" style="padding-left: 24px">Export</td><td>30</td><td>35</td><td>40</td></tr>"#
    } else {
        ""
    };
    format!(
        r#"<section id="quarters"><table class="data-table">
          <thead><tr><th></th><th>Mar 2024</th><th>Jun 2024</th><th>Sep 2024</th></tr></thead>
          <tbody>
            <tr><td class="text"><button class="button-plain" onclick="Company.showSchedule('Sales', 'quarters', this)">Sales +</button></td><td>100</td><td>110</td><td>120</td></tr>
            {children}
            <tr><td class="text">Net Profit</td><td>12</td><td>14</td></tr>
            <tr><td class="text">Raw PDF</td><td><a href="/q1.pdf">pdf</a></td><td></td><td></td></tr>
          </tbody>
        </table></section>"#
    )
}

const PROFIT_LOSS: &str = r#"
    <section id="profit-loss">
      <table class="data-table">
        <thead><tr><th></th><th>Mar 2023</th><th>Mar 2024</th></tr></thead>
        <tbody>
          <tr><td class="text">Sales</td><td>400</td><td>450</td></tr>
          <tr><td class="text">EPS in Rs</td><td>8.1</td><td>9.0</td></tr>
        </tbody>
      </table>
      <table class="ranges-table"><tr><th colspan="2">Compounded Sales Growth</th></tr>
        <tr><td>10 Years:</td><td>11%</td></tr><tr><td>TTM:</td><td>9%</td></tr></table>
      <table class="ranges-table"><tr><th colspan="2">Compounded Profit Growth</th></tr>
        <tr><td>10 Years:</td><td>13%</td></tr></table>
      <table class="ranges-table"><tr><th colspan="2">Stock Price CAGR</th></tr>
        <tr><td>1 Year:</td><td>22%</td></tr></table>
      <table class="ranges-table"><tr><th colspan="2">Return on Equity</th></tr>
        <tr><td>Last Year:</td><td>14%</td></tr></table>
    </section>
"#;

const PEERS: &str = r#"
    <section id="peers">
      <p class="sub"><a href="/market/IN01/">Industrials</a> <a href="/market/IN01/IN0101/">Machinery</a></p>
      <div id="peers-table-placeholder">
        <table class="data-table">
          <tr><th>S.No.</th><th>Name</th><th>CMP <span>Rs.</span></th><th>P/E</th><th>Mar Cap (Rs.Cr.)</th></tr>
          <tr data-row-company-id="11"><td>1.</td><td><a href="/company/ACME/">Acme Ltd</a></td><td>900</td><td>24</td><td>12345</td></tr>
          <tr data-row-company-id="12"><td>2.</td><td><a href="/company/BETA/">Beta Corp</a></td><td>310</td><td></td><td>4200</td></tr>
          <tfoot><tr><td></td><td>Median: 2 Co.</td><td>605</td><td>24</td><td>8272</td></tr></tfoot>
        </table>
      </div>
    </section>
"#;

/// The company page as rendered after login, with or without the Sales
/// schedule open.
pub fn company_page(expanded: bool) -> String {
    format!("<html><body>{}{}{}{}</body></html>", RATIOS, quarters(expanded), PROFIT_LOSS, PEERS)
}

/// Company page with only the load-bearing ratios rendered.
pub fn bare_company_page() -> String {
    format!("<html><body>{}</body></html>", RATIOS)
}

/// A site at `base` where login with any credentials lands on the
/// dashboard and `/company/ACME/` renders the full company page.
pub fn site_script(base: &str) -> Script {
    Script::default()
        .route(&format!("{}/login/", base), LOGIN_PAGE)
        .route(&format!("{}/dash/", base), "<h1>Dashboard</h1>")
        .route(&format!("{}/company/ACME/", base), &company_page(false))
        .on_click(
            "button.button-primary",
            ClickEffect::Navigate { url: format!("{}/dash/", base), emits_event: true },
        )
        .on_click(SALES_CONTROL, ClickEffect::Toggle { expanded: company_page(true) })
}

/// Same site, but the login form re-renders as if the password were wrong.
pub fn rejecting_site_script(base: &str) -> Script {
    site_script(base).on_click(
        "button.button-primary",
        ClickEffect::Navigate { url: format!("{}/login/", base), emits_event: true },
    )
}
