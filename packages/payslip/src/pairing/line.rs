use payslip_models::PairingStrategy;

use super::{CodeSets, CodeValuePairer, Pairing, pair_in_order, tokenize};

/// Pairs codes and amounts by their position within each line.
///
/// On a line with codes `c1 … cn`, the amounts between `ck` and `ck+1`
/// belong to `ck` and the last of them is taken (earlier ones are usually
/// percentages, quantities or reference numbers). When some code has no
/// amount in its span (codes printed next to each other), the line's
/// trailing amounts are handed out in code order instead. Codes still
/// without an amount take it from the next line that carries amounts but
/// no codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineBasedPairer;

impl CodeValuePairer for LineBasedPairer {
    fn strategy(&self) -> PairingStrategy {
        PairingStrategy::LineBased
    }

    fn pair(&self, block: &str, codes: &CodeSets<'_>) -> Pairing {
        let mut pairing = Pairing::default();
        let mut pending: Vec<String> = Vec::new();

        for line in block.lines() {
            let tokens = tokenize(line, codes.vocabulary);
            let code_positions: Vec<usize> = tokens
                .iter()
                .enumerate()
                .filter(|(_, t)| t.is_code())
                .map(|(i, _)| i)
                .collect();

            if code_positions.is_empty() {
                let amounts: Vec<f64> = tokens.iter().filter_map(|t| t.amount()).collect();
                if !pending.is_empty() && !amounts.is_empty() {
                    let waiting: Vec<&str> = pending.iter().map(String::as_str).collect();
                    pairing.record_line(codes, &pair_in_order(&waiting, &amounts));
                    for code in pending.drain(..) {
                        pairing.mark_unpaired(codes, &code);
                    }
                }
                continue;
            }

            // A new code line ends the wait of any earlier code.
            for code in pending.drain(..) {
                pairing.mark_unpaired(codes, &code);
            }

            let line_codes: Vec<&str> = code_positions.iter().map(|&i| tokens[i].text).collect();
            let spans: Vec<Vec<f64>> = code_positions
                .iter()
                .enumerate()
                .map(|(k, &start)| {
                    let end = code_positions.get(k + 1).copied().unwrap_or(tokens.len());
                    tokens[start + 1..end]
                        .iter()
                        .filter_map(|t| t.amount())
                        .collect()
                })
                .collect();

            let mut found: Vec<(&str, f64)> = Vec::with_capacity(line_codes.len());
            if spans.iter().all(|span| !span.is_empty()) {
                for (code, span) in line_codes.iter().zip(&spans) {
                    if span.len() > 1 {
                        pairing.mark_ambiguous(codes, code);
                    }
                    if let Some(&amount) = span.last() {
                        found.push((*code, amount));
                    }
                }
            } else {
                let trailing: Vec<f64> = tokens[code_positions[0] + 1..]
                    .iter()
                    .filter_map(|t| t.amount())
                    .collect();

                if trailing.len() >= line_codes.len() {
                    if trailing.len() > line_codes.len() {
                        for code in &line_codes {
                            pairing.mark_ambiguous(codes, code);
                        }
                    }
                    found = pair_in_order(&line_codes, &trailing);
                } else {
                    for (code, span) in line_codes.iter().zip(&spans) {
                        match span.last() {
                            Some(&amount) => found.push((*code, amount)),
                            None => pending.push((*code).to_owned()),
                        }
                    }
                }
            }
            pairing.record_line(codes, &found);
        }

        for code in pending {
            pairing.mark_unpaired(codes, &code);
        }

        pairing
    }
}
