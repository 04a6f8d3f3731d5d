use payslip_models::PairingStrategy;

use super::{CodeSets, CodeValuePairer, Pairing, tokenize};

/// Greedy nearest-following-amount pairing over the whole block.
///
/// Codes are visited in document order; each takes the first amount after
/// it that no earlier code has claimed. Line breaks are ignored when
/// claiming; they only decide which occurrence of a code repeated on one
/// line is kept (see [`CodeSets::column`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityPairer;

impl CodeValuePairer for ProximityPairer {
    fn strategy(&self) -> PairingStrategy {
        PairingStrategy::ProximityBased
    }

    fn pair(&self, block: &str, codes: &CodeSets<'_>) -> Pairing {
        let tokens = tokenize(block, codes.vocabulary);
        let mut consumed = vec![false; tokens.len()];
        let mut pairing = Pairing::default();
        let mut line = 0;
        let mut scanned = 0;
        let mut line_pairs: Vec<(&str, f64)> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if !token.is_code() {
                continue;
            }
            let token_line = line + block[scanned..token.start].matches('\n').count();
            scanned = token.start;
            if token_line != line {
                pairing.record_line(codes, &line_pairs);
                line_pairs.clear();
                line = token_line;
            }
            let claim = tokens
                .iter()
                .enumerate()
                .skip(i + 1)
                .find(|(j, t)| !consumed[*j] && t.amount().is_some());

            match claim {
                Some((j, value)) => {
                    consumed[j] = true;
                    if let Some(amount) = value.amount() {
                        line_pairs.push((token.text, amount));
                    }
                }
                None => pairing.mark_unpaired(codes, token.text),
            }
        }
        pairing.record_line(codes, &line_pairs);

        pairing
    }
}
