pub mod fixtures;

#[cfg(test)]
mod auto_reset_tests;
#[cfg(test)]
mod membership_tests;
#[cfg(test)]
mod presence_tests;
