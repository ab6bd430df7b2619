use anyhow::{bail, Context, Result};
use rirdb::address::{parse_any, to_ip_addr};
use rirdb::{cidr, cidr_blocks, classful, is_exact_cidr};
use serde_json::json;

pub fn cmd_cidr(start: String, end: String) -> Result<()> {
    let (family, first) =
        parse_any(&start).with_context(|| format!("Invalid start address: {}", start))?;
    let (end_family, last) =
        parse_any(&end).with_context(|| format!("Invalid end address: {}", end))?;
    if family != end_family {
        bail!("{} and {} belong to different address families", start, end);
    }

    let block = cidr(first, last, family)?;
    let blocks: Vec<String> = cidr_blocks(first, last, family)?
        .iter()
        .map(|b| b.to_string())
        .collect();
    let class = classful(family, first)?;
    let default_mask = class
        .default_mask()
        .map(|mask| to_ip_addr(family, mask).map(|ip| ip.to_string()))
        .transpose()?;

    let result = json!({
        "family": family,
        "start": to_ip_addr(family, first)?.to_string(),
        "end": to_ip_addr(family, last)?.to_string(),
        "size": (last - first).checked_add(1).map_or_else(|| "2^128".to_string(), |n| n.to_string()),
        "cidr": block.to_string(),
        "prefix_len": block.prefix_len,
        "exact": is_exact_cidr(first, last, family)?,
        "blocks": blocks,
        "class": class,
        "default_mask": default_mask,
    });
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
