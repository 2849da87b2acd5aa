use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Trailing simple moving average aligned to `values`.
///
/// Index `i` holds the mean of `values[i + 1 - window..=i]`; the first
/// `window - 1` positions are `None` because the window is not full yet.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(window) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let mean = sma.next(x);
            (i + 1 >= window).then_some(mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: [f64; 10] = [10.0, 11.0, 12.5, 13.0, 12.0, 14.0, 15.5, 15.0, 16.0, 17.25];

    #[test]
    fn warm_up_positions_are_undefined() {
        let ma = simple_moving_average(&PRICES, 5);
        assert_eq!(ma.len(), PRICES.len());
        assert!(ma[..4].iter().all(Option::is_none));
        assert!(ma[4..].iter().all(Option::is_some));
    }

    #[test]
    fn fifth_value_is_mean_of_first_five() {
        let ma = simple_moving_average(&PRICES, 5);
        let expected = PRICES[..5].iter().sum::<f64>() / 5.0;
        assert!((ma[4].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn every_full_window_matches_its_mean() {
        let ma = simple_moving_average(&PRICES, 5);
        for i in 4..PRICES.len() {
            let expected = PRICES[i - 4..=i].iter().sum::<f64>() / 5.0;
            assert!((ma[i].unwrap() - expected).abs() < 1e-9, "index {i}");
        }
    }

    #[test]
    fn short_series_is_all_undefined() {
        let ma = simple_moving_average(&PRICES[..4], 5);
        assert_eq!(ma, vec![None; 4]);
    }

    #[test]
    fn zero_window_yields_nothing() {
        assert_eq!(simple_moving_average(&PRICES[..3], 0), vec![None; 3]);
    }
}
