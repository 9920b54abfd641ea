//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod category;
pub mod invoice;
pub mod product;
pub mod receipt;
pub mod report;
pub mod stock;
pub mod supplier;

pub use category::{CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use invoice::{
    AddInvoiceItemInput, CreateInvoiceInput, InvoiceError, InvoiceFilter, InvoiceRepository,
    InvoiceWithItems, UpdateInvoiceInput, UpdateInvoiceItemInput,
};
pub use product::{
    CreateProductInput, ProductError, ProductFilter, ProductRepository, UpdateProductInput,
};
pub use receipt::{
    AddReceiptItemInput, CreateReceiptInput, ReceiptError, ReceiptFilter, ReceiptRepository,
    ReceiptWithItems, UpdateReceiptInput, UpdateReceiptItemInput,
};
pub use report::{
    DailySales, DashboardSummary, ProfitLine, ProfitReport, RangeSummary, ReportError,
    ReportRepository, TopProduct,
};
pub use stock::{MovementFilter, RecordMovementInput, StockLedgerError, StockRepository};
pub use supplier::{
    CreateSupplierInput, SupplierError, SupplierRepository, UpdateSupplierInput,
};
