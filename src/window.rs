//! Trailing window selection over caller-supplied price history.
//!
//! The model consumes a fixed number of the most recent observations.
//! Anything older is dropped without complaint; anything shorter is rejected.

use crate::error::ForecastError;

/// Select the most recent `window_size` prices.
///
/// # Arguments
/// * `prices` - Price history, ordered from oldest to newest
/// * `window_size` - Number of trailing observations the model consumes
///
/// # Example
/// ```
/// use price_forecast::window::select_window;
///
/// let history: Vec<f64> = (1..=70).map(|i| i as f64).collect();
/// let window = select_window(&history, 60).unwrap();
/// assert_eq!(window.len(), 60);
/// assert_eq!(window[0], 11.0);
/// ```
pub fn select_window(prices: &[f64], window_size: usize) -> Result<&[f64], ForecastError> {
    if prices.len() < window_size {
        return Err(ForecastError::InsufficientHistory {
            required: window_size,
            got: prices.len(),
        });
    }

    Ok(&prices[prices.len() - window_size..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_window_exact_length() {
        let prices: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let window = select_window(&prices, 60).unwrap();
        assert_eq!(window, prices.as_slice());
    }

    #[test]
    fn test_select_window_truncates_oldest() {
        let prices: Vec<f64> = (0..120).map(|i| i as f64).collect();
        let window = select_window(&prices, 60).unwrap();

        assert_eq!(window.len(), 60);
        assert_eq!(window.first(), Some(&60.0));
        assert_eq!(window.last(), Some(&119.0));
    }

    #[test]
    fn test_select_window_rejects_short_history() {
        let prices = vec![100.0; 59];
        match select_window(&prices, 60) {
            Err(ForecastError::InsufficientHistory { required, got }) => {
                assert_eq!(required, 60);
                assert_eq!(got, 59);
            }
            other => panic!("expected InsufficientHistory, got {:?}", other),
        }
    }

    #[test]
    fn test_select_window_empty() {
        assert!(select_window(&[], 60).is_err());
    }
}
