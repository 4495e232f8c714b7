mod common;

mod session;
mod varobj;
